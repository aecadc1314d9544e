// ==========================================
// 工作坊席位分配系统 - 候选条目解析
// ==========================================
// 职责: 将快照中的申请条目关联到 申请/学校/场次
// 输出: 可参与分配的候选条目 + 数据完整性告警
// 红线: 悬空引用只告警跳过, 不中断运行
// ==========================================

use crate::domain::{
    AllocationSnapshot, DataWarning, DataWarningKind, Request, RequestItem, School,
    WorkshopEdition,
};
use tracing::{debug, warn};

/// 已关联完整上下文的申请条目
#[derive(Debug, Clone, Copy)]
pub struct CandidateItem<'a> {
    pub item: &'a RequestItem,
    pub request: &'a Request,
    pub school: &'a School,
    pub edition: &'a WorkshopEdition,
}

impl<'a> CandidateItem<'a> {
    pub fn tier(&self) -> i32 {
        self.item.priority
    }

    pub fn school_id(&self) -> &'a str {
        &self.school.id
    }

    pub fn edition_id(&self) -> &'a str {
        &self.edition.id
    }
}

/// 解析结果
#[derive(Debug, Default)]
pub struct CandidateSet<'a> {
    pub candidates: Vec<CandidateItem<'a>>,
    pub warnings: Vec<DataWarning>,
}

/// 解析快照中的全部申请条目（保持快照顺序）
pub fn resolve_candidates(snapshot: &AllocationSnapshot) -> CandidateSet<'_> {
    let editions = snapshot.editions_by_id();
    let schools = snapshot.schools_by_id();
    let requests = snapshot.requests_by_id();

    let mut set = CandidateSet::default();

    for item in &snapshot.items {
        let request = match requests.get(item.request_id.as_str()) {
            Some(r) => *r,
            None => {
                warn!(item_id = %item.id, request_id = %item.request_id, "申请条目关联的申请不存在，跳过");
                set.warnings.push(DataWarning::new(
                    DataWarningKind::InvalidRequestItem,
                    &item.id,
                    format!("申请不存在: request_id={}", item.request_id),
                ));
                continue;
            }
        };

        if !request.is_submitted() {
            debug!(item_id = %item.id, status = %request.status, "申请未提交，跳过");
            continue;
        }

        let school = match schools.get(request.school_id.as_str()) {
            Some(s) => *s,
            None => {
                warn!(item_id = %item.id, school_id = %request.school_id, "学校不存在，跳过");
                set.warnings.push(DataWarning::new(
                    DataWarningKind::UnknownSchool,
                    &item.id,
                    format!("学校不存在: school_id={}", request.school_id),
                ));
                continue;
            }
        };

        let edition = match editions.get(item.edition_id.as_str()) {
            Some(e) => *e,
            None => {
                warn!(item_id = %item.id, edition_id = %item.edition_id, "场次引用悬空，跳过");
                set.warnings.push(DataWarning::new(
                    DataWarningKind::DanglingEdition,
                    &item.id,
                    format!("场次不存在: edition_id={}", item.edition_id),
                ));
                continue;
            }
        };

        if item.requested_students < 1 {
            warn!(item_id = %item.id, requested = item.requested_students, "申请人数无效，跳过");
            set.warnings.push(DataWarning::new(
                DataWarningKind::InvalidRequestItem,
                &item.id,
                format!("requested_students={} < 1", item.requested_students),
            ));
            continue;
        }

        set.candidates.push(CandidateItem {
            item,
            request,
            school,
            edition,
        });
    }

    set
}
