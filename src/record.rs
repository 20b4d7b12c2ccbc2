use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Amelia", "Ben", "Carla", "Chen", "Dmitri", "Elena", "Emma", "Farah",
    "Felix", "Grace", "Hana", "Hugo", "Ines", "Ivan", "Jonas", "Julia", "Kenji", "Lara",
    "Liam", "Maya", "Mateo", "Nadia", "Noah", "Olga", "Omar", "Priya", "Rosa", "Sven",
    "Tara", "Theo", "Uma", "Victor", "Wanda", "Yusuf", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Bauer", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Hoffmann",
    "Ivanova", "Jensen", "Kowalski", "Lopez", "Meyer", "Nakamura", "Oliveira", "Petrov",
    "Quinn", "Rossi", "Schmidt", "Tanaka", "Usman", "Vasquez", "Weber", "Xu", "Young",
    "Zimmermann",
];

const CITIES: &[&str] = &[
    "Amsterdam", "Berlin", "Bogota", "Cairo", "Chicago", "Dublin", "Graz", "Helsinki",
    "Kyoto", "Lagos", "Lima", "Lisbon", "Melbourne", "Montreal", "Nairobi", "Oslo",
    "Porto", "Seoul", "Toronto", "Vienna", "Warsaw", "Zurich",
];

const MAIL_DOMAINS: &[&str] = &["example.com", "mail.test", "inbox.test", "post.example"];

/// Registration dates are drawn from the year before the reference date.
const REGISTRATION_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
    pub registered: NaiveDate,
}

/// Supplies the full, fixed record list of a session.
pub trait RecordSource {
    fn records(&mut self) -> Vec<Person>;
}

impl RecordSource for Vec<Person> {
    fn records(&mut self) -> Vec<Person> {
        std::mem::take(self)
    }
}

pub struct SyntheticSource {
    count: u32,
    today: NaiveDate,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(count: u32, seed: u64, today: NaiveDate) -> Self {
        Self {
            count,
            today,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn person(&mut self, id: u32) -> Person {
        let first_name = pick(&mut self.rng, FIRST_NAMES);
        let last_name = pick(&mut self.rng, LAST_NAMES);
        let email = self.email(&first_name, &last_name);
        let city = pick(&mut self.rng, CITIES);
        let days_ago = self.rng.gen_range(1..=REGISTRATION_WINDOW_DAYS);

        Person {
            id,
            first_name,
            last_name,
            email,
            city,
            registered: self.today - Duration::days(days_ago),
        }
    }

    fn email(&mut self, first_name: &str, last_name: &str) -> String {
        let domain = pick(&mut self.rng, MAIL_DOMAINS);
        let local = match self.rng.gen_range(0..3) {
            0 => format!("{first_name}.{last_name}"),
            1 => format!("{first_name}_{last_name}{}", self.rng.gen_range(1..100)),
            _ => format!("{}{last_name}", &first_name[..1]),
        };
        format!("{}@{domain}", local.to_lowercase())
    }
}

impl RecordSource for SyntheticSource {
    fn records(&mut self) -> Vec<Person> {
        let people: Vec<Person> = (1..=self.count).map(|id| self.person(id)).collect();
        info!("Generated {} person records", people.len());
        if let Some(first) = people.first() {
            debug!("First record: {first:?}");
        }
        people
    }
}

fn pick(rng: &mut StdRng, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn generates_sequential_ids() {
        let people = SyntheticSource::new(25, 7, today()).records();
        assert_eq!(people.len(), 25);
        let ids: Vec<u32> = people.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=25).collect::<Vec<u32>>());
    }

    #[test]
    fn same_seed_same_records() {
        let a = SyntheticSource::new(50, 99, today()).records();
        let b = SyntheticSource::new(50, 99, today()).records();
        assert_eq!(a, b);
    }

    #[test]
    fn registration_is_within_past_year() {
        for p in SyntheticSource::new(200, 3, today()).records() {
            assert!(p.registered < today());
            assert!(p.registered >= today() - Duration::days(REGISTRATION_WINDOW_DAYS));
        }
    }

    #[test]
    fn email_is_derived_from_name() {
        for p in SyntheticSource::new(100, 11, today()).records() {
            let lower = p.last_name.to_lowercase();
            assert!(p.email.contains(&lower), "{} / {}", p.email, p.last_name);
            assert!(p.email.contains('@'));
        }
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(SyntheticSource::new(0, 1, today()).records().is_empty());
    }
}
