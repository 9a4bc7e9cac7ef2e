//! Built-in phrase lists used when a config file does not override them.

pub const STRONG_PHRASES: &[&str] = &[
    "happy birthday",
    "happy bday",
    "happy b'day",
    "happy bdayy",
    "hbd",
    "hppy bday",
    "many happy returns",
    "bday wishes",
    "birthday wishes to",
    "feliz cumpleaños",
    "feliz cumpleanos",
    "joyeux anniversaire",
    "alles gute zum geburtstag",
    "janamdin ki shubhkamnayein",
    "janmdin mubarak",
    "saalgirah mubarak",
];

pub const WEAK_PHRASES: &[&str] = &[
    "wish you",
    "best wishes",
    "many more",
    "have a great year",
    "have a blast",
    "stay blessed",
    "god bless",
    "cheers to another year",
    "a fantastic year ahead",
    "enjoy your day",
    "have a wonderful day",
];

pub const EMOJIS: &[&str] = &["🎂", "🎉", "🎊", "🥳", "🎈", "🎁", "🍰", "🧁", "🍾", "🥂"];

pub const NEGATIVE_PHRASES: &[&str] = &[
    "death anniversary",
    "rest in peace",
    "rip",
    "condolences",
    "passed away",
    "wedding anniversary",
];

pub const THANKS_PHRASES: &[&str] = &[
    "thank you",
    "thanks",
    "thanku",
    "thank u",
    "thankyou",
    "thx",
    "tysm",
    "grateful",
    "dhanyavad",
    "shukriya",
    "gracias",
    "merci",
];

pub const BELATED_MARKERS: &[&str] = &["belated", "late wishes", "sorry i'm late", "sorry im late"];

pub const ADVANCE_MARKERS: &[&str] = &["advance", "in advance", "early wishes", "tomorrow's birthday"];

pub const NAME_PREFIX_PATTERNS: &[&str] = &[r"^[a-z]{1,4}\s*-\s+", r"^(?:mr|mrs|ms|miss|dr)\.?\s+"];

pub fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Words never treated as name mentions even when a participant's name starts
/// with them
pub const MENTION_STOP_WORDS: &[&str] = &[
    "the", "and", "you", "your", "yours", "for", "with", "from", "all", "day", "days", "have",
    "has", "had", "this", "that", "these", "those", "many", "more", "most", "much", "wish",
    "wishes", "wishing", "happy", "birthday", "bday", "best", "great", "year", "years", "love",
    "lots", "god", "bless", "blessed", "dear", "dearest", "bro", "brother", "sis", "sister",
    "hey", "hello", "hii", "thanks", "thank", "today", "tomorrow", "very", "are", "our",
    "ours", "she", "her", "him", "his", "they", "them", "their", "who", "what", "when",
    "where", "will", "would", "could", "should", "can", "not", "but", "just", "also", "too",
    "again", "once", "here", "there", "wonderful", "amazing", "awesome", "lovely", "beautiful",
    "enjoy", "stay", "healthy", "success", "party", "cake", "celebrate", "celebration",
    "returns", "cheers", "everyone", "everybody", "guys", "friends", "family", "team",
    "aunty", "uncle", "ji", "bhai", "didi", "sir", "madam", "mam", "ma'am", "dude", "buddy",
];
