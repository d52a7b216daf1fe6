//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Story-level reads and writes that
//! originate from a parent request take the `parent_id` and filter on it.

pub mod child_repo;
pub mod learning_repo;
pub mod parent_repo;
pub mod report_repo;
pub mod section_repo;
pub mod session_repo;
pub mod share_repo;
pub mod story_repo;

pub use child_repo::ChildRepo;
pub use learning_repo::LearningRepo;
pub use parent_repo::ParentRepo;
pub use report_repo::ReportRepo;
pub use section_repo::SectionRepo;
pub use session_repo::SessionRepo;
pub use share_repo::ShareRepo;
pub use story_repo::StoryRepo;
