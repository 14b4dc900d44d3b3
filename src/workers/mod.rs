pub mod image_worker;
