// ==========================================
// 工作坊席位分配系统 - 引擎层
// ==========================================
// 职责: 实现分配规则, 不拼 SQL
// 红线: Engine 不拼 SQL, 所有拒绝必须输出 reason
// ==========================================

pub mod candidate;
pub mod constraint;
pub mod gap_filler;
pub mod orchestrator;
pub mod report;
pub mod run_state;
pub mod scorer;
pub mod student_selector;
pub mod teacher_assignment;
pub mod tie_break;

// 重导出核心引擎
pub use candidate::{resolve_candidates, CandidateItem, CandidateSet};
pub use constraint::{AssignOutcome, ConstraintEnforcer};
pub use gap_filler::GapFiller;
pub use orchestrator::{AllocationEngine, AllocationOutcome};
pub use report::{AllocationReport, EditionSummary, RejectionSample, ReportGenerator, SchoolSummary};
pub use run_state::{EditionOccupancy, RunState, SchoolTally};
pub use scorer::{ScoredItem, Scorer};
pub use student_selector::select_students;
pub use teacher_assignment::{TeacherAssigner, TeacherAssignmentResult};
