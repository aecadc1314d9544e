// ==========================================
// 工作坊席位分配系统 - 运行期状态
// ==========================================
// 职责: 场次占用表 + 学校计数表
// 红线: 仅由单次运行独占, 通过 &mut 传入各阶段, 不与其他运行共享
// ==========================================

use crate::domain::WorkshopEdition;
use std::collections::HashMap;

// ==========================================
// EditionOccupancy - 场次占用
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct EditionOccupancy {
    pub total_capacity: i32,
    pub max_per_school: i32,
    pub occupied: i32,
    per_school: HashMap<String, i32>,
}

impl EditionOccupancy {
    pub fn new(edition: &WorkshopEdition) -> Self {
        Self {
            total_capacity: edition.total_capacity,
            max_per_school: edition.max_per_school,
            occupied: 0,
            per_school: HashMap::new(),
        }
    }

    /// 剩余总容量
    pub fn remaining(&self) -> i32 {
        self.total_capacity - self.occupied
    }

    /// 学校在本场次已获席位
    pub fn school_seats(&self, school_id: &str) -> i32 {
        self.per_school.get(school_id).copied().unwrap_or(0)
    }

    /// 学校在本场次的剩余额度
    pub fn school_remaining(&self, school_id: &str) -> i32 {
        self.max_per_school - self.school_seats(school_id)
    }

    /// 已获席位的学校数
    pub fn school_count(&self) -> usize {
        self.per_school.values().filter(|s| **s > 0).count()
    }
}

// ==========================================
// SchoolTally - 学校本轮计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchoolTally {
    pub editions_won: i32, // 不同场次数
    pub seats: i32,
}

// ==========================================
// RunState - 单次运行的可变状态
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RunState {
    editions: HashMap<String, EditionOccupancy>,
    schools: HashMap<String, SchoolTally>,
}

impl RunState {
    pub fn new(editions: &[WorkshopEdition]) -> Self {
        Self {
            editions: editions
                .iter()
                .map(|e| (e.id.clone(), EditionOccupancy::new(e)))
                .collect(),
            schools: HashMap::new(),
        }
    }

    pub fn edition(&self, edition_id: &str) -> Option<&EditionOccupancy> {
        self.editions.get(edition_id)
    }

    pub fn remaining(&self, edition_id: &str) -> i32 {
        self.editions.get(edition_id).map(|e| e.remaining()).unwrap_or(0)
    }

    pub fn tally(&self, school_id: &str) -> SchoolTally {
        self.schools.get(school_id).copied().unwrap_or_default()
    }

    pub fn editions_won(&self, school_id: &str) -> i32 {
        self.tally(school_id).editions_won
    }

    /// 记录一次授予
    ///
    /// 学校首次在该场次获席时, 已获场次数 +1
    pub fn record_grant(&mut self, edition_id: &str, school_id: &str, seats: i32) {
        let Some(occupancy) = self.editions.get_mut(edition_id) else {
            return;
        };

        let before = occupancy.school_seats(school_id);
        occupancy.occupied += seats;
        occupancy
            .per_school
            .insert(school_id.to_string(), before + seats);

        let tally = self.schools.entry(school_id.to_string()).or_default();
        tally.seats += seats;
        if before == 0 {
            tally.editions_won += 1;
        }
    }
}
