// ==========================================
// 工作坊席位分配系统 - 学生名单挑选
// ==========================================
// 规则: 每条分配从关联学生中取缺勤率最高的 N 名 (N = 已分配席位),
//       缺勤率相同按建档时间早者优先, 再按学生ID
// ==========================================

use crate::domain::{AllocationCandidate, StudentCandidate, StudentLink};
use std::collections::HashSet;

/// 为每条分配挑选学生
pub fn select_students(
    allocations: &[AllocationCandidate],
    students: &[StudentCandidate],
) -> Vec<StudentLink> {
    let mut links = Vec::new();

    for alloc in allocations {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pool: Vec<&StudentCandidate> = students
            .iter()
            .filter(|s| s.school_id == alloc.school_id && alloc.item_ids.contains(&s.request_item_id))
            .filter(|s| seen.insert(s.id.as_str()))
            .collect();

        pool.sort_by(|a, b| {
            b.absenteeism
                .total_cmp(&a.absenteeism)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        let take = usize::try_from(alloc.assigned_seats).unwrap_or(0);
        links.extend(pool.into_iter().take(take).map(|s| StudentLink {
            edition_id: alloc.edition_id.clone(),
            school_id: alloc.school_id.clone(),
            student_id: s.id.clone(),
        }));
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AllocationStatus, AssignmentPass};
    use chrono::NaiveDate;

    fn student(id: &str, item: &str, absenteeism: f64, day: u32) -> StudentCandidate {
        StudentCandidate {
            id: id.to_string(),
            school_id: "S1".to_string(),
            request_item_id: item.to_string(),
            absenteeism,
            created_at: NaiveDate::from_ymd_opt(2025, 9, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_highest_absenteeism_then_earliest_record() {
        let alloc = AllocationCandidate {
            edition_id: "E1".to_string(),
            school_id: "S1".to_string(),
            assigned_seats: 2,
            status: AllocationStatus::Provisional,
            item_ids: vec!["I1".to_string()],
            first_granted_in: AssignmentPass::First,
        };
        let students = vec![
            student("ST1", "I1", 0.10, 1),
            student("ST2", "I1", 0.40, 5),
            student("ST3", "I1", 0.40, 2),
            student("ST4", "I1", 0.05, 1),
            student("ST5", "I9", 0.99, 1), // 其他条目
        ];

        let links = select_students(&[alloc], &students);
        let ids: Vec<_> = links.iter().map(|l| l.student_id.as_str()).collect();
        assert_eq!(ids, vec!["ST3", "ST2"]);
    }

    #[test]
    fn test_fewer_students_than_seats() {
        let alloc = AllocationCandidate {
            edition_id: "E1".to_string(),
            school_id: "S1".to_string(),
            assigned_seats: 4,
            status: AllocationStatus::Provisional,
            item_ids: vec!["I1".to_string(), "I2".to_string()],
            first_granted_in: AssignmentPass::First,
        };
        // 同一学生关联两个条目只计一次
        let students = vec![student("ST1", "I1", 0.2, 1), student("ST1", "I2", 0.2, 1)];

        assert_eq!(select_students(&[alloc], &students).len(), 1);
    }
}
