pub mod api_error;
pub mod info_routes;
pub mod project_routes;
pub mod stream_handle;
