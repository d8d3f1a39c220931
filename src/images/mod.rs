pub mod loader;
pub mod tensor;

pub use loader::{
    collect_loaded, decode_bytes, load_dir, ImageRecord, LoadOutcome, LoadedImages, IMAGE_SIZE,
};
pub use tensor::ImageTensor;
