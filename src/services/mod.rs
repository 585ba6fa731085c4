pub mod csv_upload;
pub mod transaction_service;
