pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

pub use bootcamp::{
    Bootcamp, BootcampResponse, Career, CreateBootcampRequest, GeoLocation,
    UpdateBootcampRequest, DEFAULT_PHOTO,
};
pub use course::{Course, CourseResponse, CreateCourseRequest, SkillLevel, UpdateCourseRequest};
pub use review::{CreateReviewRequest, Review, ReviewResponse, UpdateReviewRequest};
pub use user::{LoginRequest, RegisterRequest, Role, User, UserResponse};

/// Collection names
pub const BOOTCAMPS: &str = "bootcamps";
pub const COURSES: &str = "courses";
pub const REVIEWS: &str = "reviews";
pub const USERS: &str = "users";
