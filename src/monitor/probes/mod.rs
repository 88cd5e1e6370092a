mod file_timestamp;
mod http;
mod process;

pub use file_timestamp::FileTimestampProbe;
pub use http::HttpProbe;
pub use process::ProcessProbe;
