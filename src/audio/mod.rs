pub mod analysis;
pub mod decode;
pub mod features;
pub mod flux;
pub mod pcm;
pub mod spectrum;
pub mod tempo;
