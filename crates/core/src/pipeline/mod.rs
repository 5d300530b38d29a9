pub mod detect_image_use_case;
