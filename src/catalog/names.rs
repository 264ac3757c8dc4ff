//! Display name catalog

use crate::types::{Gender, NameOrigin};

/// Origins in roster order
pub const ORIGINS: [NameOrigin; 2] = [NameOrigin::Indian, NameOrigin::American];

const INDIAN_MALE: &[&str] = &[
    "Arjun", "Rahul", "Amit", "Rajesh", "Vikram", "Priyank", "Aditya", "Rohan", "Neeraj",
    "Sachin", "Ankit", "Deepak", "Ravi", "Sanjay", "Manoj", "Kunal", "Prakash", "Vishal",
    "Sunil", "Nitin",
];

const AMERICAN_MALE: &[&str] = &[
    "James",
    "John",
    "Michael",
    "David",
    "William",
    "Richard",
    "Joseph",
    "Thomas",
    "Charles",
    "Christopher",
];

const INDIAN_FEMALE: &[&str] = &[
    "Priya", "Neha", "Anjali", "Meera", "Pooja", "Ritu", "Anita", "Deepika", "Sneha", "Kavita",
    "Rani", "Sunita", "Lakshmi", "Geeta", "Maya",
];

const AMERICAN_FEMALE: &[&str] = &[
    "Mary",
    "Patricia",
    "Jennifer",
    "Linda",
    "Elizabeth",
    "Barbara",
    "Susan",
    "Jessica",
    "Sarah",
    "Karen",
];

/// Names in one origin x gender partition
#[must_use]
pub const fn names_for(origin: NameOrigin, gender: Gender) -> &'static [&'static str] {
    match (origin, gender) {
        (NameOrigin::Indian, Gender::Male) => INDIAN_MALE,
        (NameOrigin::American, Gender::Male) => AMERICAN_MALE,
        (NameOrigin::Indian, Gender::Female) => INDIAN_FEMALE,
        (NameOrigin::American, Gender::Female) => AMERICAN_FEMALE,
    }
}
