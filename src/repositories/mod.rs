pub(crate) mod answers;
pub(crate) mod attempts;
pub(crate) mod catalog;
pub(crate) mod exam_questions;
pub(crate) mod exams;
pub(crate) mod questions;
pub(crate) mod users;
