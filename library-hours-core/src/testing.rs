use std::path::Path;

use crate::sheet::HoursData;

/// 加载工作区下的示例表格
pub(crate) fn load_fixture() -> HoursData {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
        .join("hours.json");
    let json = std::fs::read_to_string(path).expect("failed to read fixture workbook");
    HoursData::from_json(&json).expect("failed to parse fixture workbook")
}
