// ==========================================
// 子组划分系统 - 子组数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: subgroups / subgroup_members 表的读写
// ==========================================

use crate::domain::division::{SubGroup, SubGroupMember, SubGroupMeta};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// NewSubGroup - 待写入的子组
// ==========================================
#[derive(Debug, Clone)]
pub struct NewSubGroup {
    pub name: String,
    pub meta: SubGroupMeta,
    pub user_ids: Vec<i64>,
}

/// 在事务内写入子组及其成员, 返回新子组ID
pub(crate) fn insert_subgroup_tx(
    tx: &Transaction<'_>,
    parent_group_id: i64,
    subgroup: &NewSubGroup,
    now: DateTime<Utc>,
) -> RepositoryResult<i64> {
    let meta_json = serde_json::to_string(&subgroup.meta)?;
    let ts = now.to_rfc3339();

    tx.execute(
        r#"
        INSERT INTO subgroups (parent_group_id, name, auto_generated, meta_json, created_at)
        VALUES (?1, ?2, 1, ?3, ?4)
        "#,
        params![parent_group_id, subgroup.name, meta_json, ts],
    )?;
    let subgroup_id = tx.last_insert_rowid();

    for user_id in &subgroup.user_ids {
        tx.execute(
            "INSERT INTO subgroup_members (subgroup_id, user_id, added_at) VALUES (?1, ?2, ?3)",
            params![subgroup_id, user_id, ts],
        )?;
    }

    Ok(subgroup_id)
}

/// 在事务内删除父组下所有自动生成的子组 (成员随外键级联删除)
pub(crate) fn delete_auto_generated_tx(
    tx: &Transaction<'_>,
    parent_group_id: i64,
) -> RepositoryResult<usize> {
    tx.execute(
        "DELETE FROM subgroup_members WHERE subgroup_id IN
            (SELECT id FROM subgroups WHERE parent_group_id = ?1 AND auto_generated = 1)",
        params![parent_group_id],
    )?;
    let deleted = tx.execute(
        "DELETE FROM subgroups WHERE parent_group_id = ?1 AND auto_generated = 1",
        params![parent_group_id],
    )?;
    Ok(deleted)
}

pub(crate) fn parse_timestamp(field: &str, raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("{} ({})", e, raw),
        })
}

// ==========================================
// SubGroupRepository - 子组仓储
// ==========================================
pub struct SubGroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubGroupRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询父组的全部子组
    pub fn list_by_group(&self, parent_group_id: i64) -> RepositoryResult<Vec<SubGroup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.parent_group_id, s.name, s.auto_generated, s.meta_json, s.created_at,
                   (SELECT COUNT(*) FROM subgroup_members m WHERE m.subgroup_id = s.id)
            FROM subgroups s
            WHERE s.parent_group_id = ?1
            ORDER BY s.id
            "#,
        )?;

        let rows = stmt
            .query_map(params![parent_group_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, parent_group_id, name, auto_generated, meta_json, created_at, count)|
                 -> RepositoryResult<SubGroup> {
                    Ok(SubGroup {
                        id,
                        parent_group_id,
                        name,
                        auto_generated,
                        meta: serde_json::from_str(&meta_json)?,
                        created_at: parse_timestamp("subgroups.created_at", &created_at)?,
                        member_count: count.max(0) as usize,
                    })
                },
            )
            .collect()
    }

    /// 查询子组成员 (带用户姓名/邮箱)
    pub fn list_members(&self, subgroup_id: i64) -> RepositoryResult<Vec<SubGroupMember>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id, m.subgroup_id, m.user_id, u.name, u.email, m.added_at
            FROM subgroup_members m
            LEFT JOIN users u ON u.id = m.user_id
            WHERE m.subgroup_id = ?1
            ORDER BY m.id
            "#,
        )?;

        let rows = stmt
            .query_map(params![subgroup_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, subgroup_id, user_id, user_name, user_email, added_at)|
                 -> RepositoryResult<SubGroupMember> {
                Ok(SubGroupMember {
                    id,
                    subgroup_id,
                    user_id,
                    user_name,
                    user_email,
                    added_at: parse_timestamp("subgroup_members.added_at", &added_at)?,
                })
            },
            )
            .collect()
    }
}
