pub use disc::*;

mod disc {
    /// DISC vowel symbols. Diphthongs and long vowels are single characters.
    pub const VOWELS: &str = "\
symbol
i
y
u
I
E
A
O
}
a
e
|
o
!
(
)
*
<
{
K
L
M
@";

    pub const SYLLABLE_DELIMITER: char = '-';
    pub const STRESS_MARKER: char = '\'';
    pub const EMPTY_SLOT: &str = "=";
    pub const STRESSED: &str = "+";
    pub const UNSTRESSED: &str = "-";

    /// Final obstruent neutralization, one `<class>|<marker>` rule per line.
    pub const NEUTRALIZATION: &str = "\
dt|?
xG|€
pb|£";
}
