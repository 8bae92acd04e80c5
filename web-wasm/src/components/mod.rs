pub mod header;
pub mod photo_uploader;
pub mod process_button;
pub mod progress_bar;
pub mod result_panel;
pub mod server_status;
pub mod template_gallery;
