pub mod category;
pub mod poi_record;

pub use category::Category;
pub use poi_record::{PoiRecord, UNNAMED_PLACE};
