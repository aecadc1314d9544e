// ==========================================
// 工作坊席位分配系统 - 分配引擎编排器
// ==========================================
// 用途: 协调 评分+约束(分层) → 空缺回填 → 学生挑选 → 教师绑定
// 红线: 纯变换, 不访问数据库; 同一快照 + 同一种子 → 完全相同的输出
// ==========================================

use crate::config::AllocationConfig;
use crate::domain::{
    AllocationCandidate, AllocationSnapshot, AssignmentPass, DataWarning, Rejection, SeatGrant,
    StudentLink, TeacherAssignment,
};
use crate::engine::candidate::{resolve_candidates, CandidateItem};
use crate::engine::constraint::{AssignOutcome, ConstraintEnforcer};
use crate::engine::gap_filler::GapFiller;
use crate::engine::report::{AllocationReport, ReportGenerator};
use crate::engine::run_state::RunState;
use crate::engine::scorer::Scorer;
use crate::engine::student_selector::select_students;
use crate::engine::teacher_assignment::TeacherAssigner;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

// ==========================================
// AllocationOutcome - 运行结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AllocationOutcome {
    pub allocations: Vec<AllocationCandidate>, // 每个 场次×学校 一条, 按首次授予顺序
    pub grants: Vec<SeatGrant>,                // 全部授予明细（含回填）
    pub rejections: Vec<Rejection>,
    pub teacher_assignments: Vec<TeacherAssignment>,
    pub student_links: Vec<StudentLink>,
    pub unresolved_editions: Vec<String>,
    pub warnings: Vec<DataWarning>,
}

impl AllocationOutcome {
    /// 合并授予到候选分配
    fn absorb_grant(&mut self, index: &mut HashMap<(String, String), usize>, grant: SeatGrant) {
        let key = (grant.edition_id.clone(), grant.school_id.clone());
        match index.get(&key) {
            Some(&i) => self.allocations[i].absorb(&grant),
            None => {
                index.insert(key, self.allocations.len());
                self.allocations.push(AllocationCandidate::from_grant(&grant));
            }
        }
        self.grants.push(grant);
    }
}

// ==========================================
// AllocationEngine - 分配引擎
// ==========================================
pub struct AllocationEngine {
    config: AllocationConfig,
    scorer: Scorer,
    enforcer: ConstraintEnforcer,
    gap_filler: GapFiller,
    teacher_assigner: TeacherAssigner,
    reporter: ReportGenerator,
}

impl AllocationEngine {
    pub fn new(config: AllocationConfig) -> Self {
        Self {
            scorer: Scorer::new(&config),
            enforcer: ConstraintEnforcer::new(config.equity_max_editions),
            gap_filler: GapFiller::new(ConstraintEnforcer::new(config.equity_max_editions)),
            teacher_assigner: TeacherAssigner::new(),
            reporter: ReportGenerator::new(config.rejection_sample_size),
            config,
        }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// 执行完整分配
    ///
    /// # 参数
    /// - snapshot: 周期完整输入（只读）
    ///
    /// # 返回
    /// 分配结果（候选分配、拒绝、教师绑定、学生名单、告警）
    #[instrument(skip_all, fields(
        period_id = %snapshot.period.id,
        items = snapshot.items.len(),
        editions = snapshot.editions.len()
    ))]
    pub fn run(&self, snapshot: &AllocationSnapshot) -> AllocationOutcome {
        let mut outcome = AllocationOutcome::default();

        if snapshot.is_trivially_empty() {
            info!("无申请或无场次，返回空结果");
            return outcome;
        }

        let candidate_set = resolve_candidates(snapshot);
        outcome.warnings = candidate_set.warnings;
        let candidates = candidate_set.candidates;

        let mut state = RunState::new(&snapshot.editions);
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        // ==========================================
        // 第一轮: 按优先级层评分+约束
        // ==========================================
        let mut tiers: BTreeMap<i32, Vec<CandidateItem<'_>>> = BTreeMap::new();
        for candidate in &candidates {
            tiers.entry(candidate.tier()).or_default().push(*candidate);
        }

        for (tier, tier_items) in &tiers {
            let ranked = self.scorer.rank_tier(tier_items, &state);
            debug!(tier, items = ranked.len(), "处理优先级层");

            for scored in ranked {
                let candidate = scored.candidate;
                match self.enforcer.try_assign(&candidate, &mut state, AssignmentPass::First) {
                    AssignOutcome::Granted(grant) => outcome.absorb_grant(&mut index, grant),
                    AssignOutcome::Rejected(reason) => outcome.rejections.push(Rejection {
                        item_id: candidate.item.id.clone(),
                        request_id: candidate.request.id.clone(),
                        school_id: candidate.school.id.clone(),
                        edition_id: candidate.edition.id.clone(),
                        priority: candidate.tier(),
                        reason,
                        pass: AssignmentPass::First,
                    }),
                }
            }
        }

        info!(
            tiers = tiers.len(),
            allocations = outcome.allocations.len(),
            rejections = outcome.rejections.len(),
            "第一轮分配完成"
        );

        // ==========================================
        // 第二轮: 空缺回填
        // ==========================================
        let by_item: HashMap<&str, CandidateItem<'_>> = candidates
            .iter()
            .map(|c| (c.item.id.as_str(), *c))
            .collect();
        let gap_grants =
            self.gap_filler
                .fill(&snapshot.editions, &by_item, &mut outcome.rejections, &mut state);
        for grant in gap_grants {
            outcome.absorb_grant(&mut index, grant);
        }

        // ==========================================
        // 学生名单 + 教师绑定
        // ==========================================
        outcome.student_links = select_students(&outcome.allocations, &snapshot.students);

        let submitted: Vec<_> = snapshot
            .requests
            .iter()
            .filter(|r| r.is_submitted())
            .cloned()
            .collect();
        let teacher_result =
            self.teacher_assigner
                .assign(&outcome.allocations, &submitted, &snapshot.preferences);
        outcome.teacher_assignments = teacher_result.assignments;
        outcome.unresolved_editions = teacher_result.unresolved_editions;
        outcome.warnings.extend(teacher_result.warnings);

        info!(
            allocations = outcome.allocations.len(),
            students = outcome.allocations.iter().map(|a| a.assigned_seats).sum::<i32>(),
            teacher_assignments = outcome.teacher_assignments.len(),
            unresolved = outcome.unresolved_editions.len(),
            warnings = outcome.warnings.len(),
            "分配运行完成"
        );

        outcome
    }

    /// 生成报表
    pub fn report(&self, snapshot: &AllocationSnapshot, outcome: &AllocationOutcome) -> AllocationReport {
        self.reporter.generate(snapshot, outcome, self.config.seed)
    }
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(AllocationConfig::default())
    }
}
