//! Application services for the implementation board.

mod board;

pub use board::{
    BoardServiceError, BoardServiceResult, CreateTaskRequest, ImplementationBoard,
    MoveTaskRequest, ScheduleTaskRequest,
};
