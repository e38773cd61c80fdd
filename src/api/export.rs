// ==========================================
// 子组划分系统 - CSV 导出
// ==========================================
// 职责: 将预览或已确认子组写为 CSV 文本
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::division::{SubGroup, SubGroupMember};
use crate::domain::preview::Preview;
use csv::Writer;

/// 预览导出列
pub const PREVIEW_HEADERS: [&str; 7] = [
    "subgroup_id",
    "subgroup_name",
    "user_id",
    "user_name",
    "user_email",
    "categories",
    "compatibility_avg",
];

/// 已确认子组导出列
pub const SUBGROUP_HEADERS: [&str; 6] = [
    "subgroup_id",
    "subgroup_name",
    "user_id",
    "user_name",
    "user_email",
    "added_at",
];

/// 预览 -> CSV (每个子组成员一行)
pub fn preview_to_csv(preview: &Preview) -> ApiResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(PREVIEW_HEADERS)?;

    for group in &preview.groups {
        let compatibility = group.compatibility_avg.to_string();
        for member in &group.members {
            let user_id = member.id.to_string();
            let categories = member.categories.join(", ");
            writer.write_record([
                group.id.as_str(),
                group.name.as_str(),
                user_id.as_str(),
                member.name.as_str(),
                member.email.as_str(),
                categories.as_str(),
                compatibility.as_str(),
            ])?;
        }
    }

    finish(writer)
}

/// 已确认子组 -> CSV
pub fn subgroups_to_csv(subgroups: &[(SubGroup, Vec<SubGroupMember>)]) -> ApiResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(SUBGROUP_HEADERS)?;

    for (subgroup, members) in subgroups {
        let subgroup_id = subgroup.id.to_string();
        for member in members {
            let user_id = member.user_id.to_string();
            let added_at = member.added_at.to_rfc3339();
            writer.write_record([
                subgroup_id.as_str(),
                subgroup.name.as_str(),
                user_id.as_str(),
                member.user_name.as_deref().unwrap_or(""),
                member.user_email.as_deref().unwrap_or(""),
                added_at.as_str(),
            ])?;
        }
    }

    finish(writer)
}

fn finish(writer: Writer<Vec<u8>>) -> ApiResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::ExportError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ApiError::ExportError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::division::SubGroupMeta;
    use crate::domain::member::PreviewMember;
    use crate::domain::preview::PreviewGroup;
    use chrono::{TimeZone, Utc};

    fn preview_member(id: i64, name: &str, categories: &[&str]) -> PreviewMember {
        PreviewMember {
            id,
            member_id: id + 100,
            name: name.to_string(),
            email: format!("{}@example.com", name),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            availability_count: 0,
        }
    }

    #[test]
    fn test_preview_csv_rows_and_quoting() {
        let preview = Preview {
            groups: vec![PreviewGroup {
                id: "preview-1".to_string(),
                name: "Subgroup 1".to_string(),
                members: vec![
                    preview_member(1, "ana", &["A", "B"]),
                    preview_member(2, "luis", &[]),
                ],
                compatibility_avg: 0.5,
                rules_status: Vec::new(),
            }],
            unfulfilled_rules: Vec::new(),
            total_members_assigned: 2,
            total_members_available: 2,
        };

        let csv = preview_to_csv(&preview).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], PREVIEW_HEADERS.join(","));
        // 含逗号的类别列需加引号
        assert_eq!(
            lines[1],
            "preview-1,Subgroup 1,1,ana,ana@example.com,\"A, B\",0.5"
        );
        assert_eq!(lines[2], "preview-1,Subgroup 1,2,luis,luis@example.com,,0.5");
    }

    #[test]
    fn test_subgroups_csv_missing_user_fields_are_blank() {
        let added_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let subgroup = SubGroup {
            id: 9,
            parent_group_id: 1,
            name: "Subgroup 2".to_string(),
            auto_generated: true,
            meta: SubGroupMeta::default(),
            created_at: added_at,
            member_count: 1,
        };
        let member = SubGroupMember {
            id: 1,
            subgroup_id: 9,
            user_id: 42,
            user_name: None,
            user_email: None,
            added_at,
        };

        let csv = subgroups_to_csv(&[(subgroup, vec![member])]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], SUBGROUP_HEADERS.join(","));
        assert_eq!(lines[1], "9,Subgroup 2,42,,,2024-03-01T08:00:00+00:00");
    }
}
