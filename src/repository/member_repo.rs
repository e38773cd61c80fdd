// ==========================================
// 子组划分系统 - 成员数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 为指定父组物化成员名单 (身份 + 类别 + 可用时段)
// ==========================================

use crate::domain::member::MemberRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// MemberRepository - 成员仓储
// ==========================================
pub struct MemberRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MemberRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 父组是否存在
    pub fn group_exists(&self, group_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists = conn
            .query_row("SELECT 1 FROM groups WHERE id = ?1", params![group_id], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    /// 父组成员数量
    pub fn count_members(&self, group_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// 加载父组的成员原始记录
    ///
    /// # 返回
    /// 按成员关系ID升序排列的记录; 类别名称与可用时段已挂到各自成员上
    ///
    /// # 说明
    /// 可用时段按用户统计 (不限定父组), 与成员的时段计数口径一致
    pub fn load_roster_records(&self, group_id: i64) -> RepositoryResult<Vec<MemberRecord>> {
        let conn = self.get_conn()?;

        // 1. 成员身份
        let mut stmt = conn.prepare(
            r#"
            SELECT gm.id, gm.user_id, u.name, u.email
            FROM group_members gm
            JOIN users u ON u.id = gm.user_id
            WHERE gm.group_id = ?1
            ORDER BY gm.id
            "#,
        )?;
        let mut records = stmt
            .query_map(params![group_id], |row| {
                Ok(MemberRecord {
                    member_id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                    category_names: Vec::new(),
                    availability: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if records.is_empty() {
            debug!(group_id = group_id, "父组没有成员");
            return Ok(records);
        }

        // 2. 成员类别
        let mut categories_by_member: HashMap<i64, Vec<String>> = HashMap::new();
        let mut stmt = conn.prepare(
            r#"
            SELECT gmc.group_member_id, c.name
            FROM group_member_categories gmc
            JOIN categories c ON c.id = gmc.category_id
            JOIN group_members gm ON gm.id = gmc.group_member_id
            WHERE gm.group_id = ?1
            ORDER BY gmc.id
            "#,
        )?;
        let rows = stmt.query_map(params![group_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (member_id, name) = row?;
            categories_by_member.entry(member_id).or_default().push(name);
        }

        // 3. 用户可用时段
        let mut slots_by_user: HashMap<i64, Vec<(u8, f64)>> = HashMap::new();
        let mut stmt = conn.prepare(
            r#"
            SELECT ua.user_id, a.weekday, a.hour
            FROM user_availability ua
            JOIN availability a ON a.id = ua.availability_id
            WHERE ua.user_id IN (SELECT user_id FROM group_members WHERE group_id = ?1)
            ORDER BY ua.id
            "#,
        )?;
        let rows = stmt.query_map(params![group_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;
        for row in rows {
            let (user_id, weekday, hour) = row?;
            let weekday = u8::try_from(weekday).map_err(|_| RepositoryError::FieldValueError {
                field: "availability.weekday".to_string(),
                message: format!("超出范围: {}", weekday),
            })?;
            slots_by_user.entry(user_id).or_default().push((weekday, hour));
        }

        for record in records.iter_mut() {
            if let Some(names) = categories_by_member.remove(&record.member_id) {
                record.category_names = names;
            }
            if let Some(slots) = slots_by_user.get(&record.user_id) {
                record.availability = slots.clone();
            }
        }

        debug!(
            group_id = group_id,
            members = records.len(),
            "成员名单加载完成"
        );
        Ok(records)
    }
}
