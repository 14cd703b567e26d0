/*
duty-roster: A rotating duty roster and penalty engine for classroom groups.
Copyright (C) 2024 duty-roster contributors

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::models::{GroupId, MemberId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(rename = "groupId")]
    pub group_id: GroupId,
    // Display hint only. The ledger sum is authoritative.
    #[serde(
        rename = "currentPunishmentDays",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_punishment_days: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Member>,
}

/// The fixed catalog of duty groups. Rotation order is declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Group>", into = "Vec<Group>")]
pub struct Roster {
    groups: Vec<Group>,
}

// (name, group number) as listed on the classroom notice board
const CLASSROOM_MEMBERS: [(&str, usize); 24] = [
    ("赵云", 1),
    ("周比蒙", 1),
    ("陈子盈", 1),
    ("邱力之", 2),
    ("洪声浩", 2),
    ("甘倍结", 2),
    ("王建", 3),
    ("谢贝俊", 3),
    ("夏多迪", 3),
    ("徐南方", 4),
    ("依雪融", 4),
    ("赵鸿威", 4),
    ("陈上", 5),
    ("朱语歆", 5),
    ("杨梅", 5),
    ("蔡红美", 6),
    ("崔邵程", 6),
    ("周知街", 6),
    ("周维杰", 7),
    ("南陈住和", 7),
    ("黄宇", 7),
    ("刘完蓉", 8),
    ("徐右轻", 8),
    ("张浩言", 8),
];

const CLASSROOM_GROUP_COUNT: usize = 8;

impl Roster {
    pub fn new(groups: Vec<Group>) -> Result<Self, RosterError> {
        if groups.is_empty() {
            return Err(RosterError::EmptyRoster);
        }
        Ok(Self { groups })
    }

    /// Eight groups of three, ids `group-<n>` and `member-<n>-<index>`.
    pub fn classroom() -> Self {
        let groups = (1..=CLASSROOM_GROUP_COUNT)
            .map(|number| {
                let group_id = format!("group-{number}");
                let members = CLASSROOM_MEMBERS
                    .iter()
                    .filter(|(_, group)| *group == number)
                    .enumerate()
                    .map(|(index, (name, _))| Member {
                        id: format!("member-{number}-{index}"),
                        name: name.to_string(),
                        group_id: group_id.clone(),
                        current_punishment_days: None,
                    })
                    .collect();

                Group {
                    id: group_id,
                    name: format!("小组{number}"),
                    members,
                }
            })
            .collect();

        Self { groups }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    /// Rotation slot for `index`, wrapping in both directions.
    pub fn group_at(&self, index: i64) -> &Group {
        let slot = index.rem_euclid(self.groups.len() as i64) as usize;
        &self.groups[slot]
    }

    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members().find(|member| member.id == member_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.groups.iter().flat_map(|group| group.members.iter())
    }

    pub fn require_member(&self, member_id: &str) -> Result<&Member, RosterError> {
        self.member(member_id)
            .ok_or_else(|| RosterError::UnknownMember(member_id.to_string()))
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::classroom()
    }
}

impl TryFrom<Vec<Group>> for Roster {
    type Error = RosterError;

    fn try_from(groups: Vec<Group>) -> Result<Self, Self::Error> {
        Self::new(groups)
    }
}

impl From<Roster> for Vec<Group> {
    fn from(roster: Roster) -> Self {
        roster.groups
    }
}
