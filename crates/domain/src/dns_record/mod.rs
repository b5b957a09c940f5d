pub mod rdata;
pub mod record;
pub mod record_type;

pub use rdata::{RrsigData, SoaData};
pub use record::{ResourceRecord, CLASS_IN};
pub use record_type::RecordType;
