// ==========================================
// 工作坊席位分配系统 - 随行教师绑定
// ==========================================
// 职责: 为每个有已获席位的场次绑定至少一名随行教师
// 步骤:
// A) 偏好驱动: 按 preference_order 升序, 偏好场次属于该校已获场次,
//    且该教师/该场次在本校本轮均未使用 → 绑定
// B) 名单兜底: 本校仍无教师的已获场次, 依次取名单中下一个未使用教师;
//    名单耗尽则暂不覆盖
// C) 覆盖扫描（全局）: 仍无任何教师的场次, 从持有该场次席位的学校名单中
//    取第一个尚未绑定到该场次的教师; 找不到 → 标记待人工处理（非致命）
// 红线: (场次, 教师) 重复绑定为空操作
// ==========================================

use crate::domain::{
    AllocationCandidate, AssignmentSource, DataWarning, DataWarningKind, DeclaredTeacher,
    Request, TeacherAssignment, TeacherPreference, TeacherRole,
};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

/// 教师绑定结果
#[derive(Debug, Clone, Default)]
pub struct TeacherAssignmentResult {
    pub assignments: Vec<TeacherAssignment>,
    pub unresolved_editions: Vec<String>,
    pub warnings: Vec<DataWarning>,
}

/// 运行期绑定簿
#[derive(Default)]
struct AssignmentBook {
    assignments: Vec<TeacherAssignment>,
    bound: HashSet<(String, String)>,
    per_edition: HashMap<String, usize>,
}

impl AssignmentBook {
    fn is_bound(&self, edition_id: &str, teacher_id: &str) -> bool {
        self.bound
            .contains(&(edition_id.to_string(), teacher_id.to_string()))
    }

    fn edition_count(&self, edition_id: &str) -> usize {
        self.per_edition.get(edition_id).copied().unwrap_or(0)
    }

    /// 绑定; 已存在时返回 false
    fn bind(
        &mut self,
        edition_id: &str,
        teacher_id: &str,
        teacher_name: Option<String>,
        school_id: &str,
        source: AssignmentSource,
    ) -> bool {
        if !self
            .bound
            .insert((edition_id.to_string(), teacher_id.to_string()))
        {
            return false;
        }
        *self.per_edition.entry(edition_id.to_string()).or_insert(0) += 1;
        self.assignments.push(TeacherAssignment {
            edition_id: edition_id.to_string(),
            teacher_id: teacher_id.to_string(),
            teacher_name,
            school_id: school_id.to_string(),
            role: TeacherRole::Accompanying,
            source,
        });
        true
    }
}

// ==========================================
// TeacherAssigner - 教师绑定引擎
// ==========================================
pub struct TeacherAssigner {
    // 无状态引擎
}

impl TeacherAssigner {
    pub fn new() -> Self {
        Self {}
    }

    /// 执行 A/B/C 三步绑定
    ///
    /// # 参数
    /// - `allocations`: 已接受的候选分配（按产生顺序）
    /// - `requests`: 参与分配的申请（携带申报教师名单）
    /// - `preferences`: 教师偏好
    #[instrument(skip_all, fields(allocations = allocations.len()))]
    pub fn assign(
        &self,
        allocations: &[AllocationCandidate],
        requests: &[Request],
        preferences: &[TeacherPreference],
    ) -> TeacherAssignmentResult {
        let mut warnings = Vec::new();
        let declared = collect_declared_teachers(requests, &mut warnings);

        // 学校 → 已获场次（按分配顺序）
        let mut school_order: Vec<&str> = Vec::new();
        let mut won: HashMap<&str, Vec<&str>> = HashMap::new();
        for alloc in allocations.iter().filter(|a| a.assigned_seats > 0) {
            let editions = won.entry(alloc.school_id.as_str()).or_insert_with(|| {
                school_order.push(alloc.school_id.as_str());
                Vec::new()
            });
            if !editions.contains(&alloc.edition_id.as_str()) {
                editions.push(alloc.edition_id.as_str());
            }
        }

        // 申请 → 学校
        let request_school: HashMap<&str, &str> = requests
            .iter()
            .map(|r| (r.id.as_str(), r.school_id.as_str()))
            .collect();

        let mut book = AssignmentBook::default();
        let empty: Vec<DeclaredTeacher> = Vec::new();

        for school_id in &school_order {
            let won_editions = &won[school_id];
            let teachers = declared.get(school_id).unwrap_or(&empty);
            let mut used_teachers: HashSet<String> = HashSet::new();
            let mut covered_editions: HashSet<&str> = HashSet::new();

            // ===== 步骤A: 偏好驱动 =====
            let mut school_prefs: Vec<&TeacherPreference> = preferences
                .iter()
                .filter(|p| request_school.get(p.request_id.as_str()) == Some(school_id))
                .collect();
            school_prefs.sort_by(|a, b| {
                a.preference_order
                    .cmp(&b.preference_order)
                    .then_with(|| a.request_id.cmp(&b.request_id))
                    .then_with(|| a.edition_id.cmp(&b.edition_id))
                    .then_with(|| a.teacher_id.cmp(&b.teacher_id))
            });

            for pref in school_prefs {
                let edition_id = pref.edition_id.as_str();
                if !won_editions.contains(&edition_id)
                    || used_teachers.contains(&pref.teacher_id)
                    || covered_editions.contains(edition_id)
                {
                    continue;
                }

                let name = teachers
                    .iter()
                    .find(|t| t.id == pref.teacher_id)
                    .map(|t| t.name.clone());
                book.bind(edition_id, &pref.teacher_id, name, school_id, AssignmentSource::Preference);
                used_teachers.insert(pref.teacher_id.clone());
                covered_editions.insert(edition_id);
            }

            // ===== 步骤B: 名单兜底 =====
            let mut cursor = teachers.iter();
            for edition_id in won_editions {
                if covered_editions.contains(edition_id) {
                    continue;
                }

                let Some(teacher) = cursor.by_ref().find(|t| !used_teachers.contains(&t.id)) else {
                    break;
                };

                book.bind(
                    edition_id,
                    &teacher.id,
                    Some(teacher.name.clone()),
                    school_id,
                    AssignmentSource::DeclaredList,
                );
                used_teachers.insert(teacher.id.clone());
                covered_editions.insert(*edition_id);
            }
        }

        // ===== 步骤C: 覆盖扫描 =====
        let mut edition_order: Vec<&str> = Vec::new();
        let mut holders: HashMap<&str, Vec<&str>> = HashMap::new();
        for alloc in allocations.iter().filter(|a| a.assigned_seats > 0) {
            let schools = holders.entry(alloc.edition_id.as_str()).or_insert_with(|| {
                edition_order.push(alloc.edition_id.as_str());
                Vec::new()
            });
            if !schools.contains(&alloc.school_id.as_str()) {
                schools.push(alloc.school_id.as_str());
            }
        }

        let mut unresolved_editions = Vec::new();
        for edition_id in edition_order {
            if book.edition_count(edition_id) > 0 {
                continue;
            }

            let found = holders[edition_id].iter().find_map(|school_id| {
                declared
                    .get(school_id)
                    .and_then(|list| list.iter().find(|t| !book.is_bound(edition_id, &t.id)))
                    .map(|t| (*school_id, t))
            });

            match found {
                Some((school_id, teacher)) => {
                    book.bind(
                        edition_id,
                        &teacher.id,
                        Some(teacher.name.clone()),
                        school_id,
                        AssignmentSource::CoverageFallback,
                    );
                }
                None => {
                    warn!(edition_id = %edition_id, "场次无可用随行教师，需人工处理");
                    unresolved_editions.push(edition_id.to_string());
                }
            }
        }

        info!(
            assignments = book.assignments.len(),
            unresolved = unresolved_editions.len(),
            "教师绑定完成"
        );

        TeacherAssignmentResult {
            assignments: book.assignments,
            unresolved_editions,
            warnings,
        }
    }
}

impl Default for TeacherAssigner {
    fn default() -> Self {
        Self::new()
    }
}

/// 汇总每个学校的申报教师（按申请顺序拼接、去重）
fn collect_declared_teachers<'a>(
    requests: &'a [Request],
    warnings: &mut Vec<DataWarning>,
) -> HashMap<&'a str, Vec<DeclaredTeacher>> {
    let mut declared: HashMap<&str, Vec<DeclaredTeacher>> = HashMap::new();

    for request in requests {
        let parsed = DeclaredTeacher::parse_list(request.teachers_json.as_deref());
        for reason in parsed.skipped {
            warn!(request_id = %request.id, reason = %reason, "教师名单条目不合法，已跳过");
            warnings.push(DataWarning::new(
                DataWarningKind::MalformedTeacherEntry,
                &request.id,
                reason,
            ));
        }

        let list = declared.entry(request.school_id.as_str()).or_default();
        for teacher in parsed.teachers {
            if !list.iter().any(|t| t.id == teacher.id) {
                list.push(teacher);
            }
        }
    }

    declared
}
