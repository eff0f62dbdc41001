pub mod roles;
pub mod stopwords;

use regex::Regex;

pub use roles::detect_roles;

/// Pattern families the heuristic classifier counts. Each family scores at most one hit per text.
pub struct Lexicon {
    complaint: Vec<Regex>,
    solution: Vec<Regex>,
    business: Vec<Regex>,
    boilerplate: Vec<Regex>,
}

impl Lexicon {
    pub fn new() -> Self {
        let mut lexicon = Self {
            complaint: Vec::new(),
            solution: Vec::new(),
            business: Vec::new(),
            boilerplate: Vec::new(),
        };

        lexicon.init_complaints();
        lexicon.init_solutions();
        lexicon.init_business();
        lexicon.init_boilerplate();

        lexicon
    }

    fn init_complaints(&mut self) {
        self.complaint = compile(&[
            r"\bproblem(s)?\b",
            r"\bissue(s)?\b",
            r"\bstruggl(e|ing|ed)\b",
            r"\bfrustrat(ed|ing|ion)\b",
            r"\b(can't|cannot|unable|won't|doesn't)\b",
            r"\b(delay|late|backlog|slow)\b",
            r"\b(expensive|costly|too much)\b",
            r"\bnot working\b",
        ]);
    }

    fn init_solutions(&mut self) {
        self.solution = compile(&[
            r"\bsolution\b",
            r"\bfix\b",
            r"\bwe solved\b",
            r"\bwhat worked\b",
            r"\btry\b",
            r"\byou should\b",
            r"\bbuild\b",
            r"\bautomate\b",
            r"\bapproach\b",
            r"\bidea\b",
            r"\bwe use\b",
        ]);
    }

    fn init_business(&mut self) {
        self.business = compile(&[
            r"\bcustomer(s)?\b",
            r"\bclient(s)?\b",
            r"\bstartup\b",
            r"\bsmall business\b",
            r"\bmarketing\b",
            r"\blead(s)?\b",
            r"\bsales?\b",
            r"\binvoice\b",
            r"\bpayment(s)?\b",
            r"\bworkflow\b",
            r"\bprocess(es)?\b",
            r"\bfreelanc(e|er)\b",
            r"\binventory\b",
            r"\blogistics\b",
            r"\bshipping\b",
            r"\bsaas\b",
            r"\bsoftware\b",
            r"\boperations?\b",
            r"\bmargins?\b",
            r"\bpricing\b",
        ]);
    }

    fn init_boilerplate(&mut self) {
        self.boilerplate = compile(&[
            r"this is a friendly reminder that r/",
            r"i am a bot[, ]",
            r"automoderator",
            r"removed automatically",
            r"be respectful and follow the rules",
        ]);
    }

    pub fn is_boilerplate(&self, text: &str) -> bool {
        self.boilerplate.iter().any(|p| p.is_match(text))
    }

    pub fn complaint_hits(&self, text: &str) -> usize {
        count_hits(text, &self.complaint)
    }

    pub fn solution_hits(&self, text: &str) -> usize {
        count_hits(text, &self.solution)
    }

    pub fn business_hits(&self, text: &str) -> usize {
        count_hits(text, &self.business)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).expect("valid lexicon pattern"))
        .collect()
}

fn count_hits(text: &str, patterns: &[Regex]) -> usize {
    patterns.iter().filter(|p| p.is_match(text)).count()
}
