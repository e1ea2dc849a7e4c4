pub mod response_normalizer;
pub mod summary;

pub use response_normalizer::ResponseNormalizer;
pub use summary::SummaryWriter;
