// ==========================================
// 工作坊席位分配系统 - 约束执行器
// ==========================================
// 职责: 按固定顺序校验 星期/总容量/单校上限/公平节流, 通过则授予席位
// 输入: 候选条目 + 运行期状态（会被修改）+ 轮次
// 输出: 授予记录 或 拒绝原因
// 红线: 只修改运行期状态, 不落库; 拒绝不是错误
// ==========================================

use crate::domain::{AssignmentPass, DayOfWeek, RejectionReason, SeatGrant};
use crate::engine::candidate::CandidateItem;
use crate::engine::run_state::RunState;
use tracing::debug;

/// try_assign 的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AssignOutcome {
    Granted(SeatGrant),
    Rejected(RejectionReason),
}

// ==========================================
// ConstraintEnforcer - 约束执行器
// ==========================================
pub struct ConstraintEnforcer {
    equity_max_editions: i32,
}

impl ConstraintEnforcer {
    /// # 参数
    /// - equity_max_editions: 学校已获场次数达到该值后触发公平节流
    pub fn new(equity_max_editions: i32) -> Self {
        Self { equity_max_editions }
    }

    /// 尝试为条目授予席位
    ///
    /// 规则顺序：
    /// 1) 周二场次且学校周二不可用 → DAY_UNAVAILABLE
    /// 2) 场次剩余容量 <= 0 → EDITION_FULL
    /// 3) 学校在该场次已达上限 → SCHOOL_CAP_REACHED
    /// 4) 仅第一轮: 已获场次 >= 阈值 且 剩余容量 > 单校上限 → AWAITING_EQUITY
    /// 5) 授予 min(申请人数, 剩余容量, 学校剩余额度)，为 0 → NO_SEATS_AVAILABLE
    pub fn try_assign(
        &self,
        candidate: &CandidateItem<'_>,
        state: &mut RunState,
        pass: AssignmentPass,
    ) -> AssignOutcome {
        let edition = candidate.edition;
        let school_id = candidate.school_id();

        // 1. 星期
        if edition.day_of_week == DayOfWeek::Tuesday && !candidate.request.available_for_tuesdays {
            return self.reject(candidate, RejectionReason::DayUnavailable);
        }

        let Some(occupancy) = state.edition(&edition.id) else {
            return self.reject(candidate, RejectionReason::NoSeatsAvailable);
        };
        let remaining = occupancy.remaining();
        let school_remaining = occupancy.school_remaining(school_id);

        // 2. 总容量
        if remaining <= 0 {
            return self.reject(candidate, RejectionReason::EditionFull);
        }

        // 3. 单校上限
        if school_remaining <= 0 {
            return self.reject(candidate, RejectionReason::SchoolCapReached);
        }

        // 4. 公平节流（第二轮关闭）
        if !pass.is_second()
            && state.editions_won(school_id) >= self.equity_max_editions
            && remaining > edition.max_per_school
        {
            return self.reject(candidate, RejectionReason::AwaitingEquity);
        }

        // 5. 授予
        let grant = candidate
            .item
            .requested_students
            .min(remaining)
            .min(school_remaining);
        if grant <= 0 {
            return self.reject(candidate, RejectionReason::NoSeatsAvailable);
        }

        state.record_grant(&edition.id, school_id, grant);
        debug!(
            item_id = %candidate.item.id,
            edition_id = %edition.id,
            school_id = %school_id,
            seats = grant,
            ?pass,
            "授予席位"
        );

        AssignOutcome::Granted(SeatGrant {
            item_id: candidate.item.id.clone(),
            request_id: candidate.request.id.clone(),
            edition_id: edition.id.clone(),
            school_id: school_id.to_string(),
            seats: grant,
            pass,
        })
    }

    fn reject(&self, candidate: &CandidateItem<'_>, reason: RejectionReason) -> AssignOutcome {
        debug!(
            item_id = %candidate.item.id,
            edition_id = %candidate.edition.id,
            school_id = %candidate.school_id(),
            reason = reason.code(),
            "拒绝"
        );
        AssignOutcome::Rejected(reason)
    }
}
