pub mod pocket;
pub mod task;
pub mod user;

pub use pocket::{NewPocketRequest, Pocket};
pub use task::{NewTaskRequest, Task, TaskPatch, UpdateTaskRequest};
pub use user::{AuthResponse, LoginCredentials, RegisterCredentials, User, UserProfile};
