pub mod mock_directory;

pub use mock_directory::MockDirectory;
