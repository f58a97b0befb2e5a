pub mod todo;

pub use todo::{Completion, NewTodo, Todo, TodoUpdate, Validate};
