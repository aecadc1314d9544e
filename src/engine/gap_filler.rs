// ==========================================
// 工作坊席位分配系统 - 空缺回填
// ==========================================
// 职责: 全部优先级层处理完后, 对仍有剩余容量的场次,
//       按原顺序重放该场次因公平节流 (AWAITING_EQUITY) 被拒的条目
// 规则:
// - 不重新评分
// - 公平节流关闭 (AssignmentPass::Second)
// - 星期/容量/单校上限类拒绝不重试
// - 成功 → 移出拒绝列表; 再次失败 → 保留并更新原因与轮次
// ==========================================

use crate::domain::{AssignmentPass, Rejection, RejectionReason, SeatGrant, WorkshopEdition};
use crate::engine::candidate::CandidateItem;
use crate::engine::constraint::{AssignOutcome, ConstraintEnforcer};
use crate::engine::run_state::RunState;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

// ==========================================
// GapFiller - 空缺回填引擎
// ==========================================
pub struct GapFiller {
    enforcer: ConstraintEnforcer,
}

impl GapFiller {
    pub fn new(enforcer: ConstraintEnforcer) -> Self {
        Self { enforcer }
    }

    /// 执行回填
    ///
    /// # 参数
    /// - `editions`: 场次（按快照顺序遍历）
    /// - `candidates`: 条目ID → 候选条目
    /// - `rejections`: 第一轮拒绝列表（会被修改）
    /// - `state`: 运行期状态（会被修改）
    ///
    /// # 返回
    /// 回填产生的授予记录
    #[instrument(skip_all, fields(editions = editions.len(), rejections = rejections.len()))]
    pub fn fill(
        &self,
        editions: &[WorkshopEdition],
        candidates: &HashMap<&str, CandidateItem<'_>>,
        rejections: &mut Vec<Rejection>,
        state: &mut RunState,
    ) -> Vec<SeatGrant> {
        let mut grants = Vec::new();
        let mut resolved: HashSet<usize> = HashSet::new();

        for edition in editions {
            if state.remaining(&edition.id) <= 0 {
                continue;
            }

            for (idx, rejection) in rejections.iter_mut().enumerate() {
                if rejection.edition_id != edition.id
                    || rejection.reason != RejectionReason::AwaitingEquity
                    || rejection.pass != AssignmentPass::First
                {
                    continue;
                }

                let Some(candidate) = candidates.get(rejection.item_id.as_str()) else {
                    continue;
                };

                match self.enforcer.try_assign(candidate, state, AssignmentPass::Second) {
                    AssignOutcome::Granted(grant) => {
                        resolved.insert(idx);
                        grants.push(grant);
                    }
                    AssignOutcome::Rejected(reason) => {
                        debug!(item_id = %rejection.item_id, reason = reason.code(), "回填仍被拒绝");
                        rejection.reason = reason;
                        rejection.pass = AssignmentPass::Second;
                    }
                }
            }
        }

        if !resolved.is_empty() {
            let mut idx = 0;
            rejections.retain(|_| {
                let keep = !resolved.contains(&idx);
                idx += 1;
                keep
            });
        }

        info!(granted = grants.len(), remaining_rejections = rejections.len(), "空缺回填完成");
        grants
    }
}
