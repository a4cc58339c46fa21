pub mod archive;
pub mod dataset_server;
