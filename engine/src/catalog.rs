//! Display names for work types and executors.

use crate::user::User;

/// Work types offered by the shop, `(id, display name)`.
pub const WORK_TYPES: [(&str, &str); 13] = [
    ("diagnostics", "Диагностика"),
    ("maintenance", "ТО (Масло/Фильтры)"),
    ("suspension", "Ходовая часть"),
    ("engine", "Двигатель"),
    ("brakes", "Тормозная система"),
    ("electrical", "Электрика"),
    ("air_conditioning", "Кондиционер"),
    ("heating", "Отопление"),
    ("chip_tuning", "Чип-тюнинг"),
    ("block_repair", "Ремонт блока"),
    ("programming_coding", "Программирование и кодирование"),
    ("at_repair", "Ремонт АКПП"),
    ("other", "Прочее"),
];

/// Executor ids used before executors were tied to user accounts.
const LEGACY_EXECUTORS: [(&str, &str); 4] = [
    ("stas", "Стас"),
    ("zurab", "Зураб"),
    ("elmin", "Эльмин"),
    ("sergey", "Сергей"),
];

pub fn work_type_name(id: &str) -> Option<&'static str> {
    WORK_TYPES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, name)| *name)
}

/// Resolves executor ids against the user directory, falling back to the
/// legacy names.
#[derive(Debug, Clone, Copy)]
pub struct Directory<'a> {
    users: &'a [User],
}

impl<'a> Directory<'a> {
    pub fn new(users: &'a [User]) -> Self {
        Self { users }
    }

    pub fn executor_name(&self, id: &str) -> Option<&'a str> {
        if let Some(user) = self.users.iter().find(|u| u.id == id) {
            return Some(user.display_name());
        }
        LEGACY_EXECUTORS
            .iter()
            .find(|(legacy, _)| *legacy == id)
            .map(|(_, name)| *name)
    }

    /// Known executor names joined with `", "`; unknown ids are skipped.
    pub fn executor_names(&self, ids: &[String]) -> String {
        ids.iter()
            .filter_map(|id| self.executor_name(id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Role;

    #[test]
    fn work_types() {
        assert_eq!(work_type_name("brakes"), Some("Тормозная система"));
        assert_eq!(work_type_name("teleportation"), None);
        assert_eq!(work_type_name(""), None);
    }

    #[test]
    fn executors_from_users_then_legacy() {
        let users = vec![
            User {
                id: "u2".into(),
                username: "oleg".into(),
                password: "x".into(),
                role: Role::Employee,
                full_name: String::new(),
            },
            User::default_admin(),
        ];
        let dir = Directory::new(&users);

        assert_eq!(dir.executor_name("u2"), Some("oleg"));
        assert_eq!(dir.executor_name("u1"), Some("Админ"));
        assert_eq!(dir.executor_name("zurab"), Some("Зураб"));
        assert_eq!(dir.executor_name("nobody"), None);

        let ids = vec!["u2".to_string(), "nobody".to_string(), "stas".to_string()];
        assert_eq!(dir.executor_names(&ids), "oleg, Стас");
    }
}
