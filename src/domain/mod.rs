// ==========================================
// 工作坊席位分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod period;
pub mod request;
pub mod snapshot;
pub mod student;
pub mod types;

// 重导出核心类型
pub use allocation::{
    Allocation, AllocationCandidate, DataWarning, DataWarningKind, Rejection, SeatGrant,
    StudentLink, TeacherAssignment,
};
pub use period::{EnrollmentPeriod, School, WorkshopEdition};
pub use request::{DeclaredTeacher, DeclaredTeacherList, Request, RequestItem, TeacherPreference};
pub use snapshot::AllocationSnapshot;
pub use student::StudentCandidate;
pub use types::{
    AllocationStatus, AssignmentPass, AssignmentSource, DayOfWeek, EnrollmentPhase,
    RejectionReason, TeacherRole,
};
