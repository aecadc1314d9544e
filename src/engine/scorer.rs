// ==========================================
// 工作坊席位分配系统 - 评分与层内排序
// ==========================================
// 职责: 计算申请条目在所属优先级层内的评分, 并排序
// 公式:
//   score = 100·首次参与 + 10·平均缺勤率 − 20·本轮已获场次 + tieBreak(学校, 层)
// 排序: 评分降序; 浮点完全相等时按 学校ID、条目ID 升序
// ==========================================

use crate::config::AllocationConfig;
use crate::engine::candidate::CandidateItem;
use crate::engine::run_state::RunState;
use crate::engine::tie_break;
use std::cmp::Ordering;

/// 已评分条目
#[derive(Debug, Clone, Copy)]
pub struct ScoredItem<'a> {
    pub candidate: CandidateItem<'a>,
    pub base_score: f64,
    pub tie_break: f64,
}

impl ScoredItem<'_> {
    pub fn score(&self) -> f64 {
        self.base_score + self.tie_break
    }
}

// ==========================================
// Scorer - 评分引擎
// ==========================================
pub struct Scorer {
    first_time_bonus: f64,
    absenteeism_weight: f64,
    won_edition_penalty: f64,
    tie_break_range: f64,
    seed: u64,
}

impl Scorer {
    pub fn new(config: &AllocationConfig) -> Self {
        Self {
            first_time_bonus: config.first_time_bonus,
            absenteeism_weight: config.absenteeism_weight,
            won_edition_penalty: config.won_edition_penalty,
            tie_break_range: config.tie_break_range,
            seed: config.seed,
        }
    }

    /// 不含决胜项的评分
    pub fn base_score(&self, candidate: &CandidateItem<'_>, editions_won: i32) -> f64 {
        let first_time = if candidate.school.is_first_time_participant {
            1.0
        } else {
            0.0
        };

        self.first_time_bonus * first_time
            + self.absenteeism_weight * candidate.item.avg_absenteeism
            - self.won_edition_penalty * f64::from(editions_won)
    }

    /// 决胜项
    pub fn tie_break(&self, school_id: &str, tier: i32) -> f64 {
        tie_break::tie_break(school_id, tier, self.seed, self.tie_break_range)
    }

    /// 对单个条目评分（读取运行期已获场次数）
    pub fn score<'a>(&self, candidate: CandidateItem<'a>, state: &RunState) -> ScoredItem<'a> {
        let editions_won = state.editions_won(candidate.school_id());
        ScoredItem {
            candidate,
            base_score: self.base_score(&candidate, editions_won),
            tie_break: self.tie_break(candidate.school_id(), candidate.tier()),
        }
    }

    /// 对一个优先级层评分并排序
    ///
    /// 评分在层开始时基于当前运行状态一次性计算
    pub fn rank_tier<'a>(
        &self,
        tier_items: &[CandidateItem<'a>],
        state: &RunState,
    ) -> Vec<ScoredItem<'a>> {
        let mut scored: Vec<ScoredItem<'a>> = tier_items
            .iter()
            .map(|candidate| self.score(*candidate, state))
            .collect();

        scored.sort_by(compare_scored);
        scored
    }
}

/// 高分在前
fn compare_scored(a: &ScoredItem<'_>, b: &ScoredItem<'_>) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| a.candidate.school_id().cmp(b.candidate.school_id()))
        .then_with(|| a.candidate.item.id.cmp(&b.candidate.item.id))
}
