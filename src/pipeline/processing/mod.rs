// Pipeline processing: per-table cleaning and normalization

pub mod normalize;
