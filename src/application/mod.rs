pub mod content;
pub mod error;
pub mod page_data;
pub mod queries;
pub mod scope;
pub mod store;
