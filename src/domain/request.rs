// ==========================================
// 工作坊席位分配系统 - 申请领域模型
// ==========================================
// 职责: 申请 / 申请条目 / 教师偏好 / 申报教师
// 说明: 申报教师名单来自自由格式 JSON, 解析时逐条校验,
//       不合法条目跳过并产生告警, 不会导致运行失败
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==========================================
// Request - 学校申请
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub school_id: String,
    pub period_id: String,
    pub available_for_tuesdays: bool,
    pub status: String,                // 仅 SUBMITTED 参与分配
    pub teachers_json: Option<String>, // 申报教师原始记录
}

impl Request {
    pub const STATUS_SUBMITTED: &'static str = "SUBMITTED";

    pub fn is_submitted(&self) -> bool {
        self.status.eq_ignore_ascii_case(Self::STATUS_SUBMITTED)
    }
}

// ==========================================
// RequestItem - 申请条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
    pub id: String,
    pub request_id: String,
    pub edition_id: String,
    pub requested_students: i32, // >= 1
    pub priority: i32,           // 1 = 最高
    pub avg_absenteeism: f64,    // 关联学生平均缺勤率，无学生时为 0
}

// ==========================================
// TeacherPreference - 教师偏好
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherPreference {
    pub request_id: String,
    pub edition_id: String,
    pub teacher_id: String,
    pub preference_order: i32, // 越小越优先
}

// ==========================================
// DeclaredTeacher - 申报随行教师
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredTeacher {
    pub id: String,
    pub name: String,
}

/// 申报教师名单解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredTeacherList {
    pub teachers: Vec<DeclaredTeacher>,
    pub skipped: Vec<String>, // 被跳过条目的原因
}

impl DeclaredTeacher {
    /// 解析单个条目
    ///
    /// 接受 `{"id": "...", "name": "..."}`，id 允许为数字；
    /// 缺失/空 id 或缺失 name 视为不合法
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("条目不是对象: {}", value))?;

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(format!("条目缺少有效 id: {}", value)),
        };

        let name = match obj.get("name") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(format!("条目缺少有效 name: id={}", id)),
        };

        Ok(Self { id, name })
    }

    /// 解析整张名单（容错）
    ///
    /// - `None` / 空串 → 空名单
    /// - 整体不是 JSON 数组 → 空名单 + 一条跳过记录
    /// - 重复 id 只保留第一次出现
    pub fn parse_list(raw: Option<&str>) -> DeclaredTeacherList {
        let mut result = DeclaredTeacherList::default();

        let raw = match raw.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return result,
        };

        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(other) => {
                result.skipped.push(format!("教师名单不是数组: {}", other));
                return result;
            }
            Err(e) => {
                result.skipped.push(format!("教师名单 JSON 解析失败: {}", e));
                return result;
            }
        };

        for entry in &entries {
            match Self::from_value(entry) {
                Ok(teacher) => {
                    if result.teachers.iter().any(|t| t.id == teacher.id) {
                        continue;
                    }
                    result.teachers.push(teacher);
                }
                Err(reason) => result.skipped.push(reason),
            }
        }

        result
    }
}
