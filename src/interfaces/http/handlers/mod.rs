pub mod api_info;
pub mod documents;
pub mod status;
pub mod templates;
