pub mod storage_port;
pub mod upload_port;
