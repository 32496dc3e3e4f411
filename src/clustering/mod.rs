// Clustering stages and the cluster map they share.

pub mod cluster_map;
pub mod entity;
pub mod keywords;
pub mod kmeans;
pub mod naming;
pub mod traits;
