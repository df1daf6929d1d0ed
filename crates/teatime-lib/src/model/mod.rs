pub mod search_result;
pub mod timeline;
pub mod trend_record;
