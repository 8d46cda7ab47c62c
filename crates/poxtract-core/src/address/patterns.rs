//! Regex patterns and word tables for US address parsing.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    // City, state and zip on one line: "Springfield, IL 62701", "Fort Worth Texas 76102-1234"
    pub static ref CITY_STATE_ZIP: Regex = Regex::new(
        r"(?i)\b(?:[A-Za-z\s]+[,\s]+){1,2}(?:[A-Z]{2}|[A-Za-z\s]+)\s+\d{5}(?:[-\s]?\d{4})?\b"
    ).unwrap();

    // PO box marker anywhere in the text: "PO BOX", "P.O. Box", "POBox", "P O BOX"
    pub static ref PO_BOX_MARKER: Regex = Regex::new(
        r"(?i)\b(?:P\.?\s*O\.?\s*BOX|POST\s+OFFICE\s+BOX)\b"
    ).unwrap();

    pub static ref ZIP5: Regex = Regex::new(
        r"^\d{5}(?:-\d{4})?$"
    ).unwrap();

    pub static ref ZIP4: Regex = Regex::new(
        r"^\d{4}$"
    ).unwrap();

    // "123", "123A", "12-14", "W156"
    pub static ref HOUSE_NUMBER: Regex = Regex::new(
        r"^(?:[NSEW]?\d+[A-Za-z]?(?:-\d+[A-Za-z]?)?|\d+/\d+)$"
    ).unwrap();

    // "#4", "#B-12"
    pub static ref HASH_IDENTIFIER: Regex = Regex::new(
        r"^#\s*[A-Za-z0-9-]+$"
    ).unwrap();

    pub static ref US_STATE_CODES: HashSet<&'static str> = [
        "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL",
        "IN", "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE",
        "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD",
        "TN", "TX", "UT", "VT", "VA", "WA", "WV", "WI", "WY", "AS", "GU", "MP", "PR", "VI",
        "AA", "AE", "AP",
    ].into_iter().collect();

    // Full names, upper case, as token sequences.
    pub static ref US_STATE_NAMES: Vec<Vec<&'static str>> = [
        "ALABAMA", "ALASKA", "ARIZONA", "ARKANSAS", "CALIFORNIA", "COLORADO", "CONNECTICUT",
        "DELAWARE", "DISTRICT OF COLUMBIA", "FLORIDA", "GEORGIA", "HAWAII", "IDAHO",
        "ILLINOIS", "INDIANA", "IOWA", "KANSAS", "KENTUCKY", "LOUISIANA", "MAINE", "MARYLAND",
        "MASSACHUSETTS", "MICHIGAN", "MINNESOTA", "MISSISSIPPI", "MISSOURI", "MONTANA",
        "NEBRASKA", "NEVADA", "NEW HAMPSHIRE", "NEW JERSEY", "NEW MEXICO", "NEW YORK",
        "NORTH CAROLINA", "NORTH DAKOTA", "OHIO", "OKLAHOMA", "OREGON", "PENNSYLVANIA",
        "RHODE ISLAND", "SOUTH CAROLINA", "SOUTH DAKOTA", "TENNESSEE", "TEXAS", "UTAH",
        "VERMONT", "VIRGINIA", "WASHINGTON", "WEST VIRGINIA", "WISCONSIN", "WYOMING",
        "PUERTO RICO", "GUAM",
    ].into_iter().map(|name| name.split(' ').collect()).collect();

    pub static ref STREET_SUFFIXES: HashSet<&'static str> = [
        "ALLEY", "ALY", "AVE", "AVENUE", "AV", "BLVD", "BOULEVARD", "BYP", "BYPASS", "CIR",
        "CIRCLE", "CT", "COURT", "CTR", "CENTER", "CV", "COVE", "DR", "DRIVE", "EXPY",
        "EXPRESSWAY", "FWY", "FREEWAY", "HWY", "HIGHWAY", "LN", "LANE", "LOOP", "PARKWAY",
        "PKWY", "PIKE", "PL", "PLACE", "PLZ", "PLAZA", "PT", "POINT", "RD", "ROAD", "ROW",
        "RUN", "SQ", "SQUARE", "ST", "STREET", "TER", "TERRACE", "TPKE", "TURNPIKE", "TRL",
        "TRAIL", "WAY", "XING", "CROSSING",
    ].into_iter().collect();

    pub static ref DIRECTIONALS: HashSet<&'static str> = [
        "N", "S", "E", "W", "NE", "NW", "SE", "SW", "NORTH", "SOUTH", "EAST", "WEST",
        "NORTHEAST", "NORTHWEST", "SOUTHEAST", "SOUTHWEST",
    ].into_iter().collect();

    pub static ref OCCUPANCY_TYPES: HashSet<&'static str> = [
        "APT", "APARTMENT", "BLDG", "BUILDING", "DEPT", "DEPARTMENT", "FL", "FLOOR", "LOT",
        "RM", "ROOM", "STE", "SUITE", "UNIT", "SPC", "SPACE", "TRLR", "BSMT", "OFC", "DOCK",
        "HANGAR", "PIER", "SLIP", "#",
    ].into_iter().collect();

    pub static ref COUNTRY_NAMES: HashSet<&'static str> = [
        "US", "USA", "UNITED STATES", "UNITED STATES OF AMERICA", "AMERICA",
    ].into_iter().collect();

    // Words that open an attention line ("Attn: Receiving", "c/o Dock 4").
    pub static ref ATTENTION_MARKERS: HashSet<&'static str> = [
        "ATTN", "ATTENTION", "C/O", "CO",
    ].into_iter().collect();

    // Box type spellings after periods are removed, keyed by token count.
    pub static ref PO_BOX_TYPES: HashMap<usize, Vec<Vec<&'static str>>> = {
        let mut m = HashMap::new();
        m.insert(1, vec![vec!["POBOX"], vec!["BOX"]]);
        m.insert(2, vec![vec!["PO", "BOX"]]);
        m.insert(3, vec![vec!["P", "O", "BOX"], vec!["POST", "OFFICE", "BOX"]]);
        m
    };
}

/// Normalize a token for table lookup: upper case, periods and trailing commas removed.
pub fn token_key(token: &str) -> String {
    token
        .chars()
        .filter(|c| *c != '.' && *c != ',' && *c != ';')
        .collect::<String>()
        .to_uppercase()
}
