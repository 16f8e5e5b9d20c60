//! Closed set of operation kinds

use dock_fuzz_macros::CodedEnum;

/// Identifies one concrete operation type.
///
/// The discriminants are the integer codes written to replay logs, so they
/// must never be renumbered. `None` and `Count` only bound the range and are
/// never dispatched to.
#[derive(CodedEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    #[coded(sentinel)]
    None = 0,
    CloseViaDockWidgetApi = 1,
    HideViaDockWidgetApi = 2,
    ShowViaDockWidgetApi = 3,
    AddDockWidget = 4,
    AddDockWidgetAsTab = 5,
    SaveLayout = 6,
    RestoreLayout = 7,
    #[coded(sentinel)]
    Count = 8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(OperationKind::None.code(), 0);
        assert_eq!(OperationKind::CloseViaDockWidgetApi.code(), 1);
        assert_eq!(OperationKind::AddDockWidgetAsTab.code(), 5);
        assert_eq!(OperationKind::RestoreLayout.code(), 7);
        assert_eq!(OperationKind::Count.code(), 8);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(
            OperationKind::from_code(3),
            Some(OperationKind::ShowViaDockWidgetApi)
        );
        assert_eq!(OperationKind::from_code(0), Some(OperationKind::None));
        assert_eq!(OperationKind::from_code(9), None);
        assert_eq!(OperationKind::from_code(-1), None);
    }

    #[test]
    fn test_all_skips_sentinels() {
        let all = OperationKind::all();
        assert_eq!(all.len(), 7);
        assert!(all.iter().all(|k| !k.is_sentinel()));
        assert_eq!(all[0], OperationKind::CloseViaDockWidgetApi);
        assert_eq!(all[6], OperationKind::RestoreLayout);
    }

    #[test]
    fn test_names() {
        assert_eq!(OperationKind::SaveLayout.name(), "SaveLayout");
        assert_eq!(
            OperationKind::from_name("AddDockWidget"),
            Some(OperationKind::AddDockWidget)
        );
        assert!(OperationKind::Count.is_sentinel());
    }
}
