mod attempt;
mod create;
mod list;
mod manage;
mod submit;

pub(super) use attempt::start_or_resume_attempt;
pub(super) use create::create_exam;
pub(super) use list::list_exams;
pub(super) use manage::delete_exam;
pub(super) use submit::submit_attempt;
