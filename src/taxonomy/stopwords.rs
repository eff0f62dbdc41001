use std::collections::HashSet;
use std::sync::LazyLock;

/// Words dropped before deriving a title from a single comment.
pub const TITLE_STOPWORDS: &[&str] = &[
    "the", "and", "that", "this", "with", "from", "have", "been", "they", "them", "into", "their",
    "there", "what", "when", "where", "which", "about", "were", "your", "you", "our", "for",
    "while", "over", "across", "business", "problem", "problems", "issue", "issues", "startup",
    "startups", "customer", "customers", "client", "clients", "comment", "comments", "reddit",
    "post", "posts",
];

/// Words too generic to headline a cluster of complaints.
pub const GENERIC_TITLE_WORDS: &[&str] = &[
    "problem", "problems", "issue", "issues", "struggling", "struggle", "startup", "startups",
    "business", "small", "company", "companies", "customer", "customers", "client", "clients",
    "reddit", "post", "comment",
];

const ENGLISH: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "done",
    "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else", "elsewhere",
    "enough", "etc", "even", "ever", "every", "everyone", "everything", "everywhere", "except",
    "few", "fifteen", "fifty", "first", "five", "for", "former", "formerly", "forty", "four",
    "from", "further", "get", "give", "go", "had", "has", "have", "having", "he", "hence", "her",
    "here", "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his", "how",
    "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "into", "is", "it", "its",
    "itself", "just", "keep", "last", "latter", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mine", "more", "moreover", "most", "mostly", "much", "must",
    "my", "myself", "namely", "neither", "never", "nevertheless", "next", "nine", "no",
    "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often",
    "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "per", "perhaps", "please", "put", "rather", "re", "same",
    "seem", "seemed", "seeming", "seems", "several", "she", "should", "since", "six", "sixty",
    "so", "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere",
    "still", "such", "take", "ten", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "thence", "there", "thereafter", "thereby", "therefore", "therein",
    "these", "they", "third", "this", "those", "though", "three", "through", "throughout",
    "thru", "thus", "to", "together", "too", "toward", "towards", "twelve", "twenty", "two",
    "un", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereas", "whereby", "wherein",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

static ENGLISH_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH.iter().copied().collect());

pub fn is_english_stopword(token: &str) -> bool {
    ENGLISH_SET.contains(token)
}

pub fn is_title_stopword(token: &str) -> bool {
    TITLE_STOPWORDS.contains(&token)
}

pub fn is_generic_title_word(token: &str) -> bool {
    GENERIC_TITLE_WORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopword_sets() {
        assert!(is_english_stopword("the"));
        assert!(!is_english_stopword("invoice"));
        assert!(is_title_stopword("clients"));
        assert!(!is_title_stopword("invoice"));
        assert!(is_generic_title_word("startups"));
    }
}
