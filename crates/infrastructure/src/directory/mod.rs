pub mod kubernetes;
pub mod static_list;

pub use kubernetes::{parse_pod_list, KubernetesPodDirectory};
pub use static_list::StaticDirectory;
