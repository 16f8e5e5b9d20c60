//! Dock placement vocabulary shared by operations and hosts

use bitflags::bitflags;
use dock_fuzz_macros::CodedEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Side of a main window (or of a relative-to dock widget) to dock onto.
///
/// Serialized as its integer code.
#[derive(CodedEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Location {
    #[default]
    #[coded(sentinel, rename = "none")]
    None = 0,
    #[coded(rename = "left")]
    OnLeft = 1,
    #[coded(rename = "top")]
    OnTop = 2,
    #[coded(rename = "right")]
    OnRight = 3,
    #[coded(rename = "bottom")]
    OnBottom = 4,
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        match Location::from_code(code) {
            Some(location) if !location.is_sentinel() => Ok(location),
            _ => Err(serde::de::Error::custom(format!(
                "invalid location code {code}"
            ))),
        }
    }
}

bitflags! {
    /// Options applied when adding a dock widget to a main window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AddingOptions: u32 {
        /// Reserve the place in the layout but keep the widget closed
        const START_HIDDEN = 1;
    }
}

impl Serialize for AddingOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for AddingOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(AddingOptions::from_bits_truncate(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_names() {
        assert_eq!(Location::OnLeft.name(), "left");
        assert_eq!(Location::OnBottom.name(), "bottom");
        assert_eq!(Location::from_name("top"), Some(Location::OnTop));
        assert_eq!(Location::all().len(), 4);
    }

    #[test]
    fn test_location_serializes_as_code() {
        let json = serde_json::to_value(Location::OnRight).unwrap();
        assert_eq!(json, serde_json::json!(3));

        let location: Location = serde_json::from_value(serde_json::json!(2)).unwrap();
        assert_eq!(location, Location::OnTop);
    }

    #[test]
    fn test_location_rejects_sentinel_and_unknown() {
        assert!(serde_json::from_value::<Location>(serde_json::json!(0)).is_err());
        assert!(serde_json::from_value::<Location>(serde_json::json!(42)).is_err());
    }

    #[test]
    fn test_adding_options_bits() {
        let json = serde_json::to_value(AddingOptions::START_HIDDEN).unwrap();
        assert_eq!(json, serde_json::json!(1));

        let options: AddingOptions = serde_json::from_value(serde_json::json!(0)).unwrap();
        assert!(options.is_empty());

        // Unknown bits are dropped
        let options: AddingOptions = serde_json::from_value(serde_json::json!(5)).unwrap();
        assert_eq!(options, AddingOptions::START_HIDDEN);
    }
}
