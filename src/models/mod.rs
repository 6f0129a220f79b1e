pub mod todo;

pub use todo::{CreateTodoRequest, Todo, TodoChanges, UpdateTodoRequest};
