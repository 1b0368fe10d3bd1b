use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

pub type CoupleId = Uuid;

/// Two users sharing one monthly view. The pairing is established
/// elsewhere; here it is only recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Couple {
    pub id: CoupleId,
    pub user1_id: UserId,
    pub user2_id: UserId,
    pub connected_at: DateTime<Utc>,
}

impl Couple {
    pub fn new(user1_id: UserId, user2_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            user1_id,
            user2_id,
            connected_at: Utc::now(),
        }
    }

    pub fn includes(&self, user: UserId) -> bool {
        self.user1_id == user || self.user2_id == user
    }

    /// The other member of the couple, if `user` is a member at all.
    pub fn partner_of(&self, user: UserId) -> Option<UserId> {
        if self.user1_id == user {
            Some(self.user2_id)
        } else if self.user2_id == user {
            Some(self.user1_id)
        } else {
            None
        }
    }

    pub fn members(&self) -> [UserId; 2] {
        [self.user1_id, self.user2_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_of() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let couple = Couple::new(a, b);

        assert_eq!(couple.partner_of(a), Some(b));
        assert_eq!(couple.partner_of(b), Some(a));
        assert_eq!(couple.partner_of(stranger), None);
        assert!(couple.includes(a));
        assert!(!couple.includes(stranger));
        assert_eq!(couple.members(), [a, b]);
    }
}
